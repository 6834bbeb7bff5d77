pub mod heredoc;
pub mod lexer;
pub mod source;
pub mod token;

pub use lexer::{Lexer, LexerError};
pub use source::{TokenSource, TokenStream};
pub use token::{Token, TokenKind};
