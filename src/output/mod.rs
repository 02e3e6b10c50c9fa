// Output formatting: terminal display for the operator CLI.

pub mod terminal;
