use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating username fields
    /// Must start with letter or underscore and contain only alphanumeric characters,
    /// dots and underscores
    /// - Valid: "john_doe", "user123", "_admin", "bank.cairo"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]*$").unwrap();

    /// Remote connection URLs must target Postgres
    pub static ref POSTGRES_URL_REGEX: Regex = Regex::new(r"^postgres(ql)?://\S+$").unwrap();
}
