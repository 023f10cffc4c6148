//! Generic class specialization.
//!
//! Turns a generic template plus an [`ArgumentSet`] into a concrete class,
//! memoized per template and cycle-safe.
//!
//! ## Components
//!
//! - [`Evaluator::specialize`]: the specialization algorithm
//! - [`Evaluator::type_parameters`]: ordered generic parameters of a template
//! - [`Evaluator::substitute`]: replace parameters inside a member
//! - [`receiver_params`]: parameters resolved by a method's receiver
//!
//! [`ArgumentSet`]: crate::ArgumentSet
//! [`Evaluator::specialize`]: crate::Evaluator::specialize
//! [`Evaluator::type_parameters`]: crate::Evaluator::type_parameters
//! [`Evaluator::substitute`]: crate::Evaluator::substitute

mod params;
mod sampling;
mod specialize;
mod substitution;

pub use substitution::{erase_params, receiver_params};
