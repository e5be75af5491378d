pub mod auto_roles;
pub mod incidents;
pub mod jails;
pub mod notes;
pub mod punishments;
pub mod reaction_roles;
pub mod staff_whitelist;
pub mod ticket_channels;
pub mod ticket_configs;
pub mod ticket_transcripts;
pub mod tickets;
