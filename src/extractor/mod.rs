pub mod href_scanner;
pub mod identifier;

pub use href_scanner::IdentifierExtractor;
pub use identifier::{Identifier, MembershipSet, Role};
