///!Rust doesn't natively support varargs, so callbacks of different arities are
///!unified by implementing [Callback] for each `Fn(A, B, ...) -> R` shape.  The
///!closure bridge only ever sees the erased form: a slice of [Value]s in, an
///!optional [Value] out.

use crate::error::{Error, Result};
use crate::types::Type;
use crate::value::{FromValue, ToValue, Value};

///Something a callback may return to native code.
///
/// `()` writes nothing (a boolean return slot stays `FALSE`), anything [ToValue] is written into the
/// return slot, and `Option<Value>` lets a callback decide at runtime.
pub trait CallbackReturn {
    fn into_return(self) -> Option<Value>;
}
impl CallbackReturn for () {
    #[inline] fn into_return(self) -> Option<Value> { None }
}
impl CallbackReturn for Option<Value> {
    #[inline] fn into_return(self) -> Option<Value> { self }
}
impl<T: ToValue> CallbackReturn for T {
    #[inline] fn into_return(self) -> Option<Value> { Some(self.to_value()) }
}

///A Rust closure that can stand behind a native `GClosure`.
///
/// `Args` is the tuple of parameter types; it only exists so that one closure type can implement this
/// trait once per arity.  You never name it: `obj.connect("notify", |o: StrongCell<Object>| ...)` infers it.
pub trait Callback<Args>: 'static {
    ///Number of arguments the callback asks for.
    const ARITY: usize;
    ///Calls the callback with the first [Self::ARITY] values of `args`.
    ///
    /// Conversion failures are reported without calling.  The caller guarantees `args.len() >= ARITY`.
    fn call(&self, args: &[Value]) -> Result<Option<Value>>;
    ///Whether a receiver of type `ty` can be passed as the first argument.
    fn first_accepts(ty: Type) -> bool;
}

fn argument<A: FromValue>(args: &[Value], index: usize) -> Result<A> {
    match args.get(index) {
        Some(v) => A::from_value(v),
        None => Err(Error::InvalidValue(format!("missing argument {}", index))),
    }
}

macro_rules! arguments_impl {
    (
        $arity:expr; $($identifier:ident : $type:ident),*
    ) => (
        impl<Func, Ret, $($type),*> Callback<($($type,)*)> for Func
        where Func: Fn($($type),*) -> Ret + 'static, Ret: CallbackReturn, $($type: FromValue),* {
            const ARITY: usize = $arity;
            #[allow(unused_variables, unused_mut)]
            fn call(&self, args: &[Value]) -> Result<Option<Value>> {
                let mut index = 0;
                $(
                    let $identifier: $type = argument(args, index)?;
                    index += 1;
                )*
                Ok((self)($($identifier),*).into_return())
            }
            fn first_accepts(ty: Type) -> bool {
                let accepts: &[fn(Type) -> bool] = &[$(<$type as FromValue>::accepts as fn(Type) -> bool),*];
                accepts.first().map_or(true, |f| f(ty))
            }
        }
    );
}

arguments_impl!(0;);
arguments_impl!(1; a: A);
arguments_impl!(2; a: A, b: B);
arguments_impl!(3; a: A, b: B, c: C);
arguments_impl!(4; a: A, b: B, c: C, d: D);
arguments_impl!(5; a: A, b: B, c: C, d: D, e: E);
arguments_impl!(6; a: A, b: B, c: C, d: D, e: E, f: F);

#[cfg(test)] mod tests {
    use super::*;

    fn erase<Args, F: Callback<Args>>(f: F) -> (usize, Box<dyn Fn(&[Value]) -> Result<Option<Value>>>) {
        (F::ARITY, Box::new(move |args: &[Value]| f.call(args)))
    }

    #[test] fn arity() {
        assert_eq!(erase(|| ()).0, 0);
        assert_eq!(erase(|_a: i32| ()).0, 1);
        assert_eq!(erase(|_a: i32, _b: String, _c: bool| true).0, 3);
        assert_eq!(erase(|_a: i32, _b: i32, _c: i32, _d: i32, _e: i32, _f: i32| ()).0, 6);
    }

    #[test] fn call_and_return() {
        let (_, f) = erase(|a: i32, b: i32| a + b);
        let r = f(&[2i32.to_value(), 3i32.to_value()]).unwrap().unwrap();
        assert_eq!(r.get::<i32>().unwrap(), 5);

        let (_, f) = erase(|| ());
        assert!(f(&[]).unwrap().is_none());

        //extra arguments are ignored
        let (_, f) = erase(|s: String| s.len() as u32);
        let r = f(&["four".to_value(), 1i32.to_value()]).unwrap().unwrap();
        assert_eq!(r.get::<u32>().unwrap(), 4);
    }

    #[test] fn conversion_failure() {
        let (_, f) = erase(|_s: String| ());
        assert!(matches!(f(&[Type::OBJECT.to_value()]), Err(Error::TypeMismatch { .. })));
    }

    #[test] fn receiver() {
        use crate::bindings::*;
        fn accepts<Args, F: Callback<Args>>(_f: &F, ty: Type) -> bool { F::first_accepts(ty) }
        let f = |_o: StrongCell<Object>| ();
        assert!(accepts(&f, InitiallyUnowned::static_type()));
        assert!(!accepts(&f, Type::INT));
        assert!(accepts(&|| (), Type::INT));
    }
}
