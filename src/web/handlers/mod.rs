pub mod actions;
pub mod dashboard;
pub mod qr;
pub mod webhook;
