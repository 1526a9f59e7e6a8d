//! PostgreSQL repository implementations

mod plan;
mod subscription;
mod usage;
mod user;

pub use plan::PgPlanRepository;
pub use subscription::PgSubscriptionRepository;
pub use usage::PgUsageRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub plans: PgPlanRepository,
    pub users: PgUserRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub usage: PgUsageRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            plans: PgPlanRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            usage: PgUsageRepository::new(pool),
        }
    }
}
