//! Scripted chat-funnel player: sequencer, branch router, step renderer and
//! the presentation helpers around them.

mod engine;
mod host;
mod render;
mod scheduler;
mod shell;
mod widgets;

pub use engine::{FunnelPlayer, Pending, PlayerOptions};
pub use host::{FunnelHost, NoopHost};
pub use render::{render_step, render_user_echo, step_bindings};
pub use scheduler::Scheduler;
pub use shell::AutoscrollShell;
pub use widgets::WidgetState;
