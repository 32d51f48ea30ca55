///Returns the trait implementations that make `_type` a GObject wrapper.
///
/// `get_type` is a path to the native `*_get_type()` function for the type.
pub fn instance_impl(_type: &str, get_type: &str) -> String{
    format!(r#"
    unsafe impl ::gobr::bindings::GObjectInstance for {TYPE} {{}}
    impl ::gobr::bindings::StaticType for {TYPE} {{
        fn static_type() -> ::gobr::bindings::Type {{
            //get_type functions are idempotent and threadsafe
            unsafe {{ ::gobr::bindings::Type::from_raw({GET_TYPE}()) }}
        }}
    }}
    unsafe impl ::gobr::bindings::Refcounted for {TYPE} {{
        #[inline] unsafe fn ref_raw(ptr: *const Self) {{
            ::gobr::bindings::__object_ref(ptr as *mut ::core::ffi::c_void)
        }}
        #[inline] unsafe fn unref_raw(ptr: *const Self) {{
            ::gobr::bindings::__object_unref(ptr as *mut ::core::ffi::c_void)
        }}
        #[inline] unsafe fn ref_sink_raw(ptr: *const Self) {{
            ::gobr::bindings::__object_ref_sink(ptr as *mut ::core::ffi::c_void)
        }}
        #[inline] unsafe fn is_floating_raw(ptr: *const Self) -> bool {{
            ::gobr::bindings::__object_is_floating(ptr as *mut ::core::ffi::c_void)
        }}
    }}
    impl ::gobr::bindings::ToValue for {TYPE} {{
        fn to_value(&self) -> ::gobr::bindings::Value {{
            ::gobr::bindings::Value::for_object(self)
        }}
        fn value_type(&self) -> ::gobr::bindings::Type {{
            <Self as ::gobr::bindings::StaticType>::static_type()
        }}
    }}
    //instances compare by identity
    impl ::std::cmp::PartialEq for {TYPE} {{
        fn eq(&self, other: &Self) -> bool {{ ::std::ptr::eq(self, other) }}
    }}
    impl ::std::cmp::Eq for {TYPE} {{}}
    impl ::std::hash::Hash for {TYPE} {{
        fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {{
            (self as *const Self).hash(state)
        }}
    }}
    impl std::fmt::Display for {TYPE} {{
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {{
            use ::gobr::bindings::ObjectExt;
            write!(f, "<{{}}: {{:p}}>", self.type_().name(), self)
        }}
    }}
    "#,TYPE=_type, GET_TYPE=get_type)
}
