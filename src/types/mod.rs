//! Input types: port specifications, scan targets and scan identifiers.

mod port;
mod scan_id;
mod target;

pub use port::{join_ports, parse_ports, PortError, PortRange, PortSpec};
pub use scan_id::{ScanId, ScanIdError};
pub use target::{expand_target, TargetError, TargetSpec};

pub(crate) use target::is_valid_hostname;
