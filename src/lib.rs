pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod notify;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod server;
pub mod store;
pub mod template;
pub mod types;

pub use analysis::{analyze, format_for_analysis, parse_analysis, ReasoningClient, SchemaPolicy};
pub use config::AppConfig;
pub use dispatch::{DispatchConfig, Dispatcher, Mailer, SmtpMailer};
pub use notify::{notify_best_effort, Notify, TelegramNotifier};
pub use pipeline::{generate_newsletter, run_once, Ports};
pub use reconcile::reconcile;
pub use store::{
    active_exclusions, record_niche_cooldowns, select_candidates, PgStore, Store,
    DAILY_PICK_LIMIT, DEFAULT_COOLDOWN_DAYS,
};
pub use template::render_newsletter;
pub use types::*;
