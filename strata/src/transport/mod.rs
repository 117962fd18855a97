mod fabric;

pub use fabric::{Fabric, MailboxKey};
