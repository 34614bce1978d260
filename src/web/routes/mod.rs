pub mod activities;
pub mod health;
pub mod home;
pub mod members;
pub mod search;
