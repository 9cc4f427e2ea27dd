pub(crate) mod dns;
pub(crate) mod input;
pub(crate) mod reputation;
pub(crate) mod smtp;
pub(crate) mod syntax;
