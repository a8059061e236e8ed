// Smartmark state managers
// Managers own one slice of the client workflow: session, store, mutations, filter, notices.

pub mod bookmark_store;
pub mod filter_view;
pub mod mutation_controller;
pub mod notice_board;
pub mod session_manager;
