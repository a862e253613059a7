//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod antiflood;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Show help")]
    Help,

    #[command(description = "Show antiflood settings")]
    Flood,

    #[command(description = "Set the flood limit (or off)")]
    Setflood,

    #[command(description = "Set flood limit and timer")]
    Setfloodtimer,

    #[command(description = "Set the flood action")]
    Floodmode,

    #[command(description = "Delete flood messages (yes/no)")]
    Clearflood,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_handler))
        .branch(case![Command::Help].endpoint(start::help_handler))
        // Antiflood
        .branch(case![Command::Flood].endpoint(antiflood::flood_command))
        .branch(case![Command::Setflood].endpoint(antiflood::setflood_command))
        .branch(case![Command::Setfloodtimer].endpoint(antiflood::setfloodtimer_command))
        .branch(case![Command::Floodmode].endpoint(antiflood::floodmode_command))
        .branch(case![Command::Clearflood].endpoint(antiflood::clearflood_command))
}
