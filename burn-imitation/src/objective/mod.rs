pub mod imitation;
