mod misc;
mod instances;
mod flatten;
mod strings;

use proc_macro::{TokenStream};
use misc::{error, parse_literal_string};

///Derive macro for GObjectInstance.
///
/// Requires a tuple struct (usually over `c_void`) and a `#[gtype(path)]` attribute naming
/// the native `*_get_type` function.
///
/// ```ignore
/// use gobr::bindings::*;
/// #[derive(GObjectInstance)]
/// #[gtype(gio_sys::g_cancellable_get_type)]
/// #[repr(transparent)]
/// pub struct Cancellable(core::ffi::c_void);
/// ```
#[proc_macro_derive(GObjectInstance, attributes(gtype))]
pub fn derive_gobject_instance(stream: TokenStream) -> TokenStream {
    //we're looking for something like `#[gtype(path)] ... struct Foo`
    let mut saw_gtype = false;
    let mut get_type = None;
    let mut parse_ident = false;
    let mut parsed_name = None;
    let mut item_help = None;

    //Do a flat parse, groups are dumb
    use flatten::{FlatIterator,FlatTree};
    for item in FlatIterator::new(stream.into_iter()) {
        match &item {
            FlatTree::Ident(i) if get_type.is_none() && i.to_string() == "gtype" => {
                saw_gtype = true;
            }
            FlatTree::Enter(g) if saw_gtype && get_type.is_none() => {
                get_type = Some(g.stream().to_string());
            }
            FlatTree::Ident(i) if !parse_ident && i.to_string() == "struct" => {
                parse_ident = true; //about to see the type name
            }
            FlatTree::Ident(i) if parse_ident =>  {
                parsed_name = Some(i.to_string());
                break;
            }
            _ => ()
        }
        item_help = Some(item);
    }
    let get_type = match get_type {
        Some(g) if !g.trim().is_empty() => g,
        _ => return error("Expected a `#[gtype(native_get_type_fn)]` attribute")
    };
    match parsed_name {
        None => error(&format!("Looking for `struct Identifier` near {:?}",item_help)),
        Some(name) => instances::instance_impl(&name, &get_type).parse().unwrap()
    }
}

/// Creates a compile-time `&'static CStr` for a given literal.
///
/// Signal and property names are passed to native code as C strings; this macro
/// avoids the allocation of converting a `&str` on every call.
/// ```
/// use gobr_procmacro::gstr;
/// let s: &'static std::ffi::CStr = gstr!("notify::enabled");
/// assert_eq!(s.to_bytes(), b"notify::enabled");
/// ```
///
/// Interior nuls are rejected at compile time:
/// ```compile_fail
/// use gobr_procmacro::gstr;
/// let s = gstr!("bad\0string");
/// ```
#[proc_macro]
pub fn gstr(stream: TokenStream) -> TokenStream {
    let mut iter = stream.into_iter();
    let literal = match parse_literal_string(&mut iter) {
        Ok(literal) => literal,
        Err(str) => {return error(&format!("Expected a literal {}",str)) }
    };
    if literal.is_raw() {
        return error("Raw literals are not supported by gstr!");
    }
    let extra = iter.next();
    if extra.is_some() {
        return error(&format!("Expected end of macro near {:?}",extra.unwrap()));
    }
    if let Err(e) = strings::check_cstr_literal(literal.contents()) {
        return error(&e);
    }
    strings::static_cstr(literal.contents()).parse().unwrap()
}
