pub mod auto_roles;
pub mod history;
pub mod incidents;
pub mod moderation;
pub mod reaction_roles;
pub mod scheduler;
pub mod tickets;
pub mod whitelist;
