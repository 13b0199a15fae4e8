/*!
 * Identity extractor
 *
 * Responsibility:
 * - Hand the `Identity` resolved by the access middleware to handlers
 */

mod core;

pub use self::core::MaybeIdentity;
