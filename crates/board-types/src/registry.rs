//! Registry trait for self-registering implementations.

/// Declares the configuration name and factory of a pluggable implementation.
///
/// The name is the key used in the TOML configuration, for example `memory`
/// for `[store.implementations.memory]`.
pub trait ImplementationRegistry {
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	fn factory() -> Self::Factory;
}
