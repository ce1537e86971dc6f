//! Services
//!
//! The bot runtime: transport to the streaming application, scheduler,
//! command dispatch, chat binding and the engine that ties them together.

pub mod dispatcher;
pub mod engine;
pub mod obs;
pub mod remote;
pub mod rpc;
pub mod scheduler;

pub use dispatcher::{BotCommand, CommandDispatcher, DispatchOutcome};
pub use engine::{BotEngine, CommandConstructor, ComponentConstructor, Registrations};
pub use rpc::{RpcClient, RpcError, TransportConfig};
pub use scheduler::{ScheduledTask, Scheduler};
