mod abc;

pub use abc::Actor;
