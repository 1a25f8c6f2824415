//! Peripheral session engine
//!
//! Consumes host stack events and produces host commands. The state machine
//! owns the connection, the prepared write buffer and the attribute values;
//! the send gate is shared with the senders.

mod command;
mod event;
mod flow;
mod machine;
mod reassembler;
mod state;


pub use command::Command;
pub use event::HostEvent;
pub use flow::{BackoffConfig, FlowController, SendGate, SendStatus};
pub use machine::{transition, Session};
pub use reassembler::{CommitOutcome, PreparedWriteBuffer, PREPARE_BUF_MAX_SIZE};
pub use state::{Connection, LinkState, ServiceState, SessionState};
