#[cfg(test)]
pub(crate) mod test_support;

mod contact_field_equals;
mod create_contact;
mod delete_contact;
mod discover_contact;

pub use contact_field_equals::ContactFieldEquals;
pub use create_contact::CreateContact;
pub use delete_contact::DeleteContact;
pub use discover_contact::DiscoverContact;
