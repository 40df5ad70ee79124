// Notifier plugin implementations
pub mod discord;
pub mod log;
pub mod telegram;

pub use discord::DiscordNotifier;
pub use log::LogNotifier;
pub use telegram::TelegramNotifier;
