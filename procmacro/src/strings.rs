///Emits an expression of type `&'static CStr` for a string literal.
///
/// The literal is re-emitted as a byte string with a trailing nul, so escapes
/// keep their Rust meaning.
pub fn static_cstr(string_literal: &str) -> String {
    format!(r#"
    {{
        const BYTES: &[u8] = b"{STRING_LITERAL}\0";
        //nul-termination and absence of interior nuls were checked at expansion time
        unsafe {{ ::std::ffi::CStr::from_bytes_with_nul_unchecked(BYTES) }}
    }}
    "#,STRING_LITERAL=string_literal)
}

///Checks that `literal` can be a C string.  Returns a description of the problem otherwise.
pub fn check_cstr_literal(literal: &str) -> Result<(),String> {
    if !literal.is_ascii() {
        return Err(format!("gstr! literals must be ascii, found {:?}",literal));
    }
    //escapes are still in source form here
    let mut chars = literal.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('0') => return Err("gstr! literals cannot contain interior nul".to_string()),
                Some('x') => {
                    let hi = chars.next();
                    let lo = chars.next();
                    if hi == Some('0') && lo == Some('0') {
                        return Err("gstr! literals cannot contain interior nul".to_string());
                    }
                }
                Some('u') => return Err("gstr! literals cannot use unicode escapes".to_string()),
                _ => ()
            }
        }
    }
    Ok(())
}
