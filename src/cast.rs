/*! Cast behavior. */

use crate::instance::GObjectInstance;

/**GObject type that can be used as another type.

By implementing this trait you promise that `Self` is `T` or derives from (or implements) `T`, so a
pointer to `Self` is always a valid pointer to `T`.  Implementations are declared with [gobject_upcast!].
*/
pub unsafe trait IsA<T: GObjectInstance>: GObjectInstance {
    ///Borrows `self` as its ancestor type.
    fn upcast_ref(&self) -> &T {
        unsafe { &*(self as *const Self as *const T) }
    }
}

unsafe impl<T: GObjectInstance> IsA<T> for T {}

/**
Declares a safe conversion from one type to an ancestor type.

This is useful for things like casting a widget to its superclass, or an object to an interface it implements.

Arguments:
* `from` - The type to cast from.
* `to` - The type to cast to.
* `cast` - The name of the cast function to declare.  Typical values are `as_totype`.

# Safety

You must annotate the `to` argument with the `unsafe` modifier.  This is to signify that we will not do any checking that
the type is actually a subtype of the type we are casting to.  If you cast to a type that is not a subtype, you will get
undefined behavior.

# Example

```
use gobr::bindings::*;
gobject_instance! {
    struct MyUnowned: gobject_sys::g_initially_unowned_get_type;
}
gobject_upcast!(MyUnowned, unsafe Object, as_object_ref);

let u = InitiallyUnowned::new();
let mine: &MyUnowned = u.downcast_ref().unwrap();
let a: &Object = mine.as_object_ref();
let b: &Object = mine.into();
assert_eq!(a, b);
```
*/
#[macro_export]
macro_rules! gobject_upcast {
    ($from:ty, unsafe $to:ty, $methname:ident) => {
        impl $from {
            pub fn $methname(&self) -> &$to {
                unsafe {
                    $crate::bindings::GObjectInstanceBehavior::cast(self)
                }
            }
        }
        impl<'s> std::convert::From<&'s $from> for &'s $to {
            fn from(a: &'s $from) -> Self {
                a.$methname()
            }
        }
        unsafe impl $crate::bindings::IsA<$to> for $from {}
    };
}

#[test] fn upcast_ref() {
    use crate::bindings::*;
    fn takes_object<O: IsA<Object>>(o: &O) -> Type {
        IsA::<Object>::upcast_ref(o).type_()
    }
    let u = InitiallyUnowned::new();
    assert_eq!(takes_object(&*u), InitiallyUnowned::static_type());
    let o = Object::new();
    assert_eq!(takes_object(&*o), Type::OBJECT);
}
