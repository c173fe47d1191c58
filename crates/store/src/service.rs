use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tracing::{Instrument, info_span};
use vasini_survey::{Inbound, Reply, ReplyTx, SurveyMachine};

use crate::{ServiceError, SessionStore, UserId, UserLocks};

/// Load, mutate and persist one user's session per inbound event.
///
/// Events for the same user are handled strictly one after another (the
/// profile synthesis call included); distinct users run concurrently.
pub struct SurveyService {
    machine: SurveyMachine,
    store: Arc<dyn SessionStore>,
    locks: UserLocks,
    rng: Mutex<StdRng>,
}

impl SurveyService {
    pub fn new(machine: SurveyMachine, store: Arc<dyn SessionStore>) -> Self {
        Self::with_rng(machine, store, StdRng::from_entropy())
    }

    /// Deterministic advice sampling, for tests and reproducible runs.
    pub fn with_seed(machine: SurveyMachine, store: Arc<dyn SessionStore>, seed: u64) -> Self {
        Self::with_rng(machine, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(machine: SurveyMachine, store: Arc<dyn SessionStore>, rng: StdRng) -> Self {
        Self {
            machine,
            store,
            locks: UserLocks::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn machine(&self) -> &SurveyMachine {
        &self.machine
    }

    pub async fn handle(
        &self,
        user: UserId,
        inbound: Inbound,
        out: &ReplyTx,
    ) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(user).await;

        async {
            let mut session = self.store.get(user).await?;
            let mut rng = self.session_rng();
            let result = self.machine.handle(&mut session, inbound, &mut rng, out).await;
            // The machine leaves the session consistent even on error.
            self.store.update(user, &session).await?;
            result.map_err(ServiceError::from)
        }
        .instrument(info_span!("session", user))
        .await
    }

    /// Collect replies instead of streaming them.
    pub async fn respond(&self, user: UserId, inbound: Inbound) -> Result<Vec<Reply>, ServiceError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.handle(user, inbound, &tx).await?;
        drop(tx);
        let mut replies = Vec::new();
        while let Some(reply) = rx.recv().await {
            replies.push(reply);
        }
        Ok(replies)
    }

    /// Forget everything about `user`, advice history included.
    pub async fn forget(&self, user: UserId) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(user).await;
        self.store.clear(user).await?;
        Ok(())
    }

    fn session_rng(&self) -> StdRng {
        let seed = match self.rng.lock() {
            Ok(mut rng) => rng.next_u64(),
            Err(poisoned) => poisoned.into_inner().next_u64(),
        };
        StdRng::seed_from_u64(seed)
    }
}
