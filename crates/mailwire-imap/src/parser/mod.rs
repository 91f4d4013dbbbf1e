//! IMAP response parsing.
//!
//! Sans-I/O: the lexer and parser operate on complete response units
//! produced by the connection framer, never on sockets.

pub mod lexer;
mod response;

pub use response::{
    Address, Envelope, FetchItem, MessageHeader, Response, ResponseParser, UntaggedResponse,
};
