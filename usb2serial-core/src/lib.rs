//! Platform-agnostic core of the USB-to-serial adapter.
//!
//! This crate holds everything that does not touch hardware registers:
//! the boot-time mode decision, the lock-free byte queues shared with the
//! UART interrupt, the bridge engine, the line-encoding controller and the
//! programmer packet dispatch. Hardware is reached through small traits so
//! the whole crate runs in host tests.
//!
//! # Overview
//!
//! - [`mode`]: Strap sampling and the boot-time latch ([`ModeLatch`])
//! - [`queue`]: SPSC byte queue ([`ByteQueue`], [`Producer`], [`Consumer`])
//! - [`line`]: Line encoding, frame word and UART reconfiguration ([`SerialLineController`])
//! - [`uart`]: UART traits ([`UartConfig`], [`UartTransmit`]) and [`accept_rx_byte`]
//! - [`control`]: CDC control events ([`ControlEvent`], [`ControlTracker`])
//! - [`reset`]: DTR-driven target reset ([`ResetLine`])
//! - [`link`]: USB channel traits ([`SerialChannel`], [`BulkLink`])
//! - [`bridge`]: Bridge engine ([`BridgeEngine`])
//! - [`transfer`]: Bulk request/response framing
//! - [`programmer`]: Programmer dispatch ([`ProgrammerDispatch`], [`CommandProcessor`])
//! - [`session`]: The active personality ([`Session`], [`ModeRunner`])
//! - [`status`]: Activity indication ([`ActivityIndicator`])
//!
//! # Concurrency
//!
//! The only state shared with interrupt context is the UART-to-host
//! [`ByteQueue`]: the receive interrupt owns its [`Producer`], the bridge
//! engine owns its [`Consumer`]. Everything else runs in the main loop.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod bridge;
pub mod control;
pub mod line;
pub mod link;
pub mod mode;
pub mod programmer;
pub mod queue;
pub mod reset;
pub mod session;
pub mod status;
pub mod transfer;
pub mod uart;

// Re-export main types at crate root
pub use bridge::{BridgeEngine, BridgeQueues};
pub use control::{ControlChanges, ControlEvent, ControlTracker};
pub use line::{BaudDivisor, FrameControl, LineEncoding, Parity, SerialLineController, StopBits};
pub use link::{BulkLink, LinkError, SerialChannel};
pub use mode::{sample_strap, ModeLatch, OperatingMode, StrapPolarity};
pub use programmer::{CommandProcessor, ProgrammerDispatch, UnknownCommandResponder, STATUS_CMD_UNKNOWN};
pub use queue::{ByteQueue, Consumer, Producer};
pub use reset::ResetLine;
pub use session::{ModeRunner, Session};
pub use status::{ActivityIndicator, IdleTimer, NoIndicator, IDLE_TICKS};
pub use transfer::{AssembleError, TransferAssembler, TransferSplitter};
pub use uart::{accept_rx_byte, UartConfig, UartTransmit};

pub use usb2serial_descriptors as descriptors;
