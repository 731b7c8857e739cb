//! Registry trait for self-registering implementations.
//!
//! Signer and account implementations each expose a `Registry` struct naming the
//! configuration key they are selected by and the factory that builds them.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"local"` for `[signers.implementations.local]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
