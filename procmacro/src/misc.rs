//! Misc helper functions
use proc_macro::{TokenTree, TokenStream};
///Returns an error
pub fn error(error: &str) -> TokenStream {
    //For whatever reason we can't use `compile_error!` with a quote
    let safe_str = error.replace('\\', "\\\\").replace('"', "\\\"");
    format!("compile_error!(\"{}\")",safe_str).parse().unwrap()
}

///In some cases, procmacros may be given a type in a "group" wrapper (with a single child).
/// This appears to be the case when they are invoked by another macro.
fn unbox_group(tree: TokenTree) -> TokenTree {
    match &tree {
        TokenTree::Group(g) => {
            let mut iter = g.stream().into_iter();
            let unboxed = match iter.next() {
                Some(u) => u,
                None => TokenTree::Group(g.to_owned())
            };
            //check if this is a single child or not
            match iter.next() {
                //additional child: do not unbox and return the original tree
                Some(_) => TokenTree::Group(g.to_owned()),
                //no additional child, unbox
                None => unboxed
            }
        }
        other => other.to_owned()
    }
}

#[derive(Debug)]
pub enum ParsedLiteral {
    RawLiteral(String),
    Literal(String)
}
impl ParsedLiteral {
    ///The literal contents, with escapes left as written.
    pub fn contents(&self) -> &str {
        match self {
            ParsedLiteral::Literal(l) => l,
            ParsedLiteral::RawLiteral(l) => l,
        }
    }
    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedLiteral::RawLiteral(_))
    }
}

///Parses the a literal string, unboxing from a group if needed.
///
/// If no literal can be parsed, returns `Err`
pub fn parse_literal_string<I: Iterator<Item=TokenTree>>(iterator: &mut I) -> Result<ParsedLiteral,String> {
    let next = match iterator.next() {
        Some(u) => u,
        None => { return Err("Nothing found.".to_string())}
    };
    let unboxed_next = unbox_group(next);
    match unboxed_next {
        TokenTree::Literal(s) if s.to_string().starts_with('"') => {
            let mut parsed_string = s.to_string();
            parsed_string.remove(parsed_string.len()-1);
            parsed_string.remove(0);
            Ok(ParsedLiteral::Literal(parsed_string))
        },
        //parse raw strings like r#"test"#
        TokenTree::Literal(s) if s.to_string().starts_with("r#\"") => {
            let mut parsed_string = s.to_string();
            //remove 2 from the tail `"#`
            parsed_string.truncate(parsed_string.len()-2);
            //remove 3 chars from the head `r#"`
            parsed_string.drain(..3);
            Ok(ParsedLiteral::RawLiteral(parsed_string))
        }
        other => {
            Err(format!("unexpected {:?}",other))
        }
    }
}
