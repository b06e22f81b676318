use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::Arc;
use subscription_crank::core::constants::TOKEN_PROGRAM_ID;
use subscription_crank::core::rpc::classify_transaction_error;
use subscription_crank::engine::{CrankLoop, DueNotifier};
use subscription_crank::types::TokenAccountInfo;
use subscription_crank::utils::{pack_token_account, parse_token_account};
use subscription_crank::{
    derive_associated_token_address, derive_delegate_pda, derive_plan_pda,
    derive_subscription_pda, ChargeRejection, LedgerConnection, SubmitError,
};
use subscription_state::{AccountRecord, Plan, Subscription};
use tokio::sync::{watch, Mutex};

pub const T0: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;
pub const PRICE: u64 = 5_000_000;

/// What the fake ledger does with a charge for a given subscription.
#[derive(Debug, Clone)]
pub enum SubmitBehavior {
    Accept,
    /// Fail the transaction with this error, classified as the RPC ledger would
    Reject(TransactionError),
    Transport,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    listing_order: Vec<Pubkey>,
    fail_listing: bool,
    unreachable: HashSet<Pubkey>,
    behaviors: HashMap<Pubkey, SubmitBehavior>,
    submissions: Vec<Pubkey>,
    reads: HashMap<Pubkey, usize>,
    clock: i64,
    cancel_after: Option<(usize, watch::Sender<bool>)>,
}

/// In-memory ledger that applies accepted charges the way the program does.
#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<LedgerState>,
}

impl FakeLedger {
    pub async fn put_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&address) {
            state.listing_order.push(address);
        }
        state.accounts.insert(
            address,
            Account {
                lamports: 1_000_000,
                data,
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub async fn remove_account(&self, address: &Pubkey) {
        let mut state = self.state.lock().await;
        state.accounts.remove(address);
        state.listing_order.retain(|a| a != address);
    }

    pub async fn set_clock(&self, now: i64) {
        self.state.lock().await.clock = now;
    }

    pub async fn fail_listing(&self, fail: bool) {
        self.state.lock().await.fail_listing = fail;
    }

    pub async fn make_unreachable(&self, address: Pubkey) {
        self.state.lock().await.unreachable.insert(address);
    }

    pub async fn set_behavior(&self, subscription: Pubkey, behavior: SubmitBehavior) {
        self.state.lock().await.behaviors.insert(subscription, behavior);
    }

    /// Raise `cancel` once `n` submissions have been seen.
    pub async fn cancel_after(&self, n: usize, cancel: watch::Sender<bool>) {
        self.state.lock().await.cancel_after = Some((n, cancel));
    }

    pub async fn submissions(&self) -> Vec<Pubkey> {
        self.state.lock().await.submissions.clone()
    }

    pub async fn reads_of(&self, address: &Pubkey) -> usize {
        self.state
            .lock()
            .await
            .reads
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    pub async fn subscription(&self, address: &Pubkey) -> Subscription {
        let state = self.state.lock().await;
        Subscription::load(&state.accounts[address].data).unwrap()
    }

    pub async fn token_account(&self, address: &Pubkey) -> TokenAccountInfo {
        let state = self.state.lock().await;
        parse_token_account(&state.accounts[address].data).unwrap()
    }

    fn apply_charge(state: &mut LedgerState, keys: &[Pubkey]) -> Result<(), SubmitError> {
        // [Subscriber, Operator, Subscription, Plan, Delegate, CreatorAta, SubscriberAta, ..]
        let (subscription_key, plan_key) = (keys[2], keys[3]);
        let (creator_ata, subscriber_ata) = (keys[5], keys[6]);

        let plan = Plan::load(&state.accounts[&plan_key].data)
            .map_err(|e| SubmitError::Failed(e.to_string()))?;
        let mut sub = Subscription::load(&state.accounts[&subscription_key].data)
            .map_err(|e| SubmitError::Failed(e.to_string()))?;

        if !plan.is_active {
            return Err(SubmitError::Rejected(ChargeRejection::PlanPaused));
        }
        if !sub.is_active {
            return Err(SubmitError::Rejected(ChargeRejection::SubscriptionInactive));
        }
        if state.clock < sub.next_charge_at {
            return Err(SubmitError::Rejected(ChargeRejection::NotYetDue));
        }

        let mut from = state
            .accounts
            .get(&subscriber_ata)
            .and_then(|a| parse_token_account(&a.data))
            .ok_or(SubmitError::Rejected(ChargeRejection::MissingTokenAccount))?;
        let mut to = state
            .accounts
            .get(&creator_ata)
            .and_then(|a| parse_token_account(&a.data))
            .ok_or(SubmitError::Rejected(ChargeRejection::MissingTokenAccount))?;

        if from.delegated_amount < plan.price {
            return Err(SubmitError::Rejected(ChargeRejection::DelegationExhausted));
        }
        if from.amount < plan.price {
            return Err(SubmitError::Rejected(ChargeRejection::InsufficientFunds));
        }

        from.amount -= plan.price;
        from.delegated_amount -= plan.price;
        to.amount += plan.price;
        sub.last_charged_at = state.clock;
        sub.next_charge_at = state.clock + plan.interval;

        state.accounts.get_mut(&subscriber_ata).unwrap().data = pack_token_account(&from);
        state.accounts.get_mut(&creator_ata).unwrap().data = pack_token_account(&to);
        state.accounts.get_mut(&subscription_key).unwrap().data = account_data(&sub);
        Ok(())
    }
}

#[async_trait]
impl LedgerConnection for FakeLedger {
    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>> {
        let state = self.state.lock().await;
        if state.fail_listing {
            return Err("connection refused".into());
        }
        Ok(state
            .listing_order
            .iter()
            .filter_map(|key| {
                let account = &state.accounts[key];
                (account.owner == *program_id && account.data.starts_with(discriminator))
                    .then(|| (*key, account.clone()))
            })
            .collect())
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.lock().await;
        *state.reads.entry(*pubkey).or_default() += 1;
        if state.unreachable.contains(pubkey) {
            return Err("timed out".into());
        }
        Ok(state.accounts.get(pubkey).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmitError> {
        let mut state = self.state.lock().await;

        if tx.verify().is_err() {
            return Err(SubmitError::Failed(
                "signature verification failed".to_string(),
            ));
        }

        let ix = &tx.message.instructions[0];
        let keys: Vec<Pubkey> = ix
            .accounts
            .iter()
            .map(|i| tx.message.account_keys[*i as usize])
            .collect();
        let subscription = keys[2];
        state.submissions.push(subscription);

        let submitted = state.submissions.len();
        if let Some((n, cancel)) = &state.cancel_after {
            if submitted >= *n {
                let _ = cancel.send(true);
            }
        }

        let behavior = state
            .behaviors
            .get(&subscription)
            .cloned()
            .unwrap_or(SubmitBehavior::Accept);

        match behavior {
            SubmitBehavior::Transport => Err(SubmitError::Transport("timed out".to_string())),
            SubmitBehavior::Reject(err) => Err(classify_transaction_error(&err)),
            SubmitBehavior::Accept => {
                Self::apply_charge(&mut state, &keys)?;
                Ok(tx.signatures[0])
            },
        }
    }
}

pub fn account_data<T: AccountRecord + borsh::BorshSerialize>(record: &T) -> Vec<u8> {
    let mut data = T::discriminator().to_vec();
    data.extend(borsh::to_vec(record).unwrap());
    data
}

pub struct TestPlan {
    pub address: Pubkey,
    pub creator: Pubkey,
    pub mint: Pubkey,
}

pub struct TestSubscription {
    pub address: Pubkey,
    pub subscriber: Pubkey,
    pub subscriber_ata: Pubkey,
}

/// A fake ledger seeded with one program, plus the operator that cranks it.
pub struct TestContext {
    pub ledger: Arc<FakeLedger>,
    pub program_id: Pubkey,
    pub operator: Keypair,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(FakeLedger::default()),
            program_id: Pubkey::new_unique(),
            operator: Keypair::new(),
        }
    }

    pub fn crank<N: DueNotifier + 'static>(
        &self,
        notifier: N,
    ) -> CrankLoop<Arc<FakeLedger>, Keypair, N> {
        CrankLoop::new(
            self.ledger.clone(),
            self.operator.insecure_clone(),
            notifier,
            self.program_id,
        )
    }

    pub async fn add_token_account(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
        amount: u64,
        delegate: Option<Pubkey>,
        delegated_amount: u64,
    ) -> Pubkey {
        let address = derive_associated_token_address(owner, mint).unwrap();
        let info = TokenAccountInfo {
            mint: *mint,
            owner: *owner,
            amount,
            delegate,
            delegated_amount,
        };
        self.ledger
            .put_account(address, TOKEN_PROGRAM_ID, pack_token_account(&info))
            .await;
        address
    }

    /// Plan with a funded creator token account.
    pub async fn add_plan(&self, price: u64, interval: i64, is_active: bool) -> TestPlan {
        self.add_plan_with_mint(price, interval, is_active, Pubkey::new_unique())
            .await
    }

    /// Plan settling in `mint`. The creator token account is only created
    /// when `mint` is a usable key.
    pub async fn add_plan_with_mint(
        &self,
        price: u64,
        interval: i64,
        is_active: bool,
        mint: Pubkey,
    ) -> TestPlan {
        let creator = Pubkey::new_unique();
        let address = derive_plan_pda(&self.program_id, &creator).unwrap();
        let plan = Plan {
            creator: creator.to_bytes(),
            name: "monthly".to_string(),
            token_mint: mint.to_bytes(),
            price,
            interval,
            subscriber_count: 0,
            bump: 255,
            created_at: T0,
            is_active,
        };
        let mut data = account_data(&plan);
        data.resize(Plan::SPACE, 0);
        self.ledger.put_account(address, self.program_id, data).await;
        if mint != Pubkey::default() {
            self.add_token_account(&creator, &mint, 0, None, 0).await;
        }

        TestPlan {
            address,
            creator,
            mint,
        }
    }

    pub async fn put_subscription(
        &self,
        subscriber: &Pubkey,
        plan: &Pubkey,
        is_active: bool,
        next_charge_at: i64,
    ) -> Pubkey {
        let address = derive_subscription_pda(&self.program_id, subscriber, plan).unwrap();
        let sub = Subscription {
            subscriber: subscriber.to_bytes(),
            plan: plan.to_bytes(),
            bump: 254,
            is_active,
            last_charged_at: next_charge_at - DAY,
            next_charge_at,
            created_at: T0,
        };
        self.ledger
            .put_account(address, self.program_id, account_data(&sub))
            .await;
        address
    }

    /// Subscriber with a token account holding `balance` and a delegation of
    /// `ceiling` to the program's delegate PDA.
    pub async fn add_subscriber(
        &self,
        plan: &TestPlan,
        is_active: bool,
        next_charge_at: i64,
        balance: u64,
        ceiling: u64,
    ) -> TestSubscription {
        let subscriber = Pubkey::new_unique();
        let delegate = derive_delegate_pda(&self.program_id, &subscriber).unwrap();
        let subscriber_ata = self
            .add_token_account(&subscriber, &plan.mint, balance, Some(delegate), ceiling)
            .await;
        let address = self
            .put_subscription(&subscriber, &plan.address, is_active, next_charge_at)
            .await;

        TestSubscription {
            address,
            subscriber,
            subscriber_ata,
        }
    }
}
