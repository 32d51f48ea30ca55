/*! `GList` and `GSList`, the linked lists GLib APIs hand out.

A list owns its nodes, never its elements: dropping one frees the nodes (`g_list_free`) and leaves whatever
the elements point at alone.  Lists returned by native functions are adopted with `from_raw_full` when the
caller owns the container, and walked without ownership through [ListIter::from_raw] otherwise.

Elements are pointers.  Reading them back as anything else is up to the caller:

```
use gobr::glib::*;
use std::ffi::c_void;
let mut list: List<c_void> = List::new();
list.append(1 as *mut c_void);
list.append(2 as *mut c_void);
list.prepend(0 as *mut c_void);
let raw: Vec<usize> = list.iter().map(|p| p as usize).collect();
assert_eq!(raw, vec![0, 1, 2]);
```
*/

use std::ffi::{c_int, c_uint};
use std::marker::PhantomData;
use glib_sys::{GList, GSList};
use crate::instance::Refcounted;
use crate::objectpointers::StrongCell;

macro_rules! linked_list {
    (
        $(#[$meta:meta])*
        $list:ident, $iter:ident, $node:ty,
        $append:path, $prepend:path, $insert:path, $length:path, $nth_data:path, $reverse:path, $free:path
    ) => {
        $(#[$meta])*
        pub struct $list<T> {
            head: *mut $node,
            _element: PhantomData<*mut T>,
        }

        impl<T> $list<T> {
            pub const fn new() -> Self {
                $list { head: std::ptr::null_mut(), _element: PhantomData }
            }
            ///Adopts a list whose nodes the caller owns (transfer container or full).
            ///
            /// # Safety
            /// `head` must be NULL or the first node of a list nobody else frees.
            pub unsafe fn from_raw_full(head: *mut $node) -> Self {
                $list { head, _element: PhantomData }
            }
            #[inline] pub fn as_raw(&self) -> *mut $node {
                self.head
            }
            ///Hands the nodes to the caller.
            pub fn into_raw(self) -> *mut $node {
                let head = self.head;
                std::mem::forget(self);
                head
            }

            ///Walks the whole list.
            pub fn append(&mut self, element: *mut T) {
                self.head = unsafe { $append(self.head, element as glib_sys::gpointer) };
            }
            pub fn prepend(&mut self, element: *mut T) {
                self.head = unsafe { $prepend(self.head, element as glib_sys::gpointer) };
            }
            ///Inserts at `position`.  Positions past the end append.
            pub fn insert(&mut self, element: *mut T, position: usize) {
                let position = c_int::try_from(position).unwrap_or(-1);
                self.head = unsafe { $insert(self.head, element as glib_sys::gpointer, position) };
            }
            pub fn reverse(&mut self) {
                self.head = unsafe { $reverse(self.head) };
            }

            pub fn len(&self) -> usize {
                unsafe { $length(self.head) as usize }
            }
            pub fn is_empty(&self) -> bool {
                self.head.is_null()
            }
            pub fn nth(&self, n: usize) -> Option<*mut T> {
                let n = c_uint::try_from(n).ok()?;
                if n as usize >= self.len() {
                    return None;
                }
                Some(unsafe { $nth_data(self.head, n) } as *mut T)
            }
            pub fn iter(&self) -> $iter<'_, T> {
                $iter { node: self.head, _list: PhantomData }
            }

            ///Borrows every element as a `&T`.
            ///
            /// # Safety
            /// Every element must point to a live `T` for as long as the references are used.
            pub unsafe fn iter_ref(&self) -> impl Iterator<Item = &T> + '_ {
                self.iter().map(|p| &*p)
            }
            ///Takes a reference on every element.
            ///
            /// # Safety
            /// Every element must be a live, non-NULL `T`.
            pub unsafe fn to_strong(&self) -> Vec<StrongCell<T>> where T: Refcounted {
                self.iter().map(|p| StrongCell::retaining(&*p)).collect()
            }
        }

        impl<T> Default for $list<T> {
            fn default() -> Self { Self::new() }
        }
        impl<T> Drop for $list<T> {
            fn drop(&mut self) {
                if !self.head.is_null() {
                    unsafe { $free(self.head) }
                }
            }
        }
        impl<T> std::fmt::Debug for $list<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_list().entries(self.iter()).finish()
            }
        }
        impl<'a, T> IntoIterator for &'a $list<T> {
            type Item = *mut T;
            type IntoIter = $iter<'a, T>;
            fn into_iter(self) -> $iter<'a, T> { self.iter() }
        }

        ///Element pointers of a list, front to back.
        pub struct $iter<'a, T> {
            node: *mut $node,
            _list: PhantomData<(&'a $node, *mut T)>,
        }
        impl<'a, T> $iter<'a, T> {
            ///Walks a list owned by someone else.
            ///
            /// # Safety
            /// The list must not change or be freed during `'a`.
            pub unsafe fn from_raw(head: *const $node) -> Self {
                $iter { node: head as *mut $node, _list: PhantomData }
            }
        }
        impl<T> Iterator for $iter<'_, T> {
            type Item = *mut T;
            fn next(&mut self) -> Option<*mut T> {
                if self.node.is_null() {
                    return None;
                }
                unsafe {
                    let node = &*self.node;
                    self.node = node.next;
                    Some(node.data as *mut T)
                }
            }
        }
        impl<T> std::iter::FusedIterator for $iter<'_, T> {}
    };
}

linked_list! {
    ///A doubly linked `GList`.
    List, ListIter, GList,
    glib_sys::g_list_append, glib_sys::g_list_prepend, glib_sys::g_list_insert, glib_sys::g_list_length,
    glib_sys::g_list_nth_data, glib_sys::g_list_reverse, glib_sys::g_list_free
}

linked_list! {
    ///A singly linked `GSList`.  Prepending is cheap; appending walks the list.
    SList, SListIter, GSList,
    glib_sys::g_slist_append, glib_sys::g_slist_prepend, glib_sys::g_slist_insert, glib_sys::g_slist_length,
    glib_sys::g_slist_nth_data, glib_sys::g_slist_reverse, glib_sys::g_slist_free
}

impl<T> List<T> {
    ///Element pointers from back to front.
    pub fn iter_rev(&self) -> impl Iterator<Item = *mut T> + '_ {
        let mut node = unsafe { glib_sys::g_list_last(self.head) };
        std::iter::from_fn(move || {
            if node.is_null() {
                return None;
            }
            unsafe {
                let data = (*node).data as *mut T;
                node = (*node).prev;
                Some(data)
            }
        })
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use std::ffi::c_void;

    fn p(n: usize) -> *mut c_void { n as *mut c_void }
    fn numbers(it: impl Iterator<Item = *mut c_void>) -> Vec<usize> {
        it.map(|e| e as usize).collect()
    }

    #[test] fn list_basics() {
        let mut list = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.nth(0).is_none());
        list.append(p(1));
        list.append(p(2));
        list.prepend(p(0));
        assert_eq!(list.len(), 3);
        assert_eq!(numbers(list.iter()), vec![0, 1, 2]);

        list.insert(p(9), 1);
        list.insert(p(10), 100);
        assert_eq!(numbers(list.iter()), vec![0, 9, 1, 2, 10]);
        assert_eq!(list.nth(1), Some(p(9)));
        assert!(list.nth(5).is_none());
        assert_eq!(numbers(list.iter_rev()), vec![10, 2, 1, 9, 0]);
        list.reverse();
        assert_eq!(numbers((&list).into_iter()), vec![10, 2, 1, 9, 0]);
    }

    #[test] fn slist_basics() {
        let mut list = SList::new();
        for n in 0..3 {
            list.prepend(p(n));
        }
        assert_eq!(list.len(), 3);
        assert_eq!(numbers(list.iter()), vec![2, 1, 0]);
        list.append(p(7));
        list.insert(p(5), 0);
        assert_eq!(numbers(list.iter()), vec![5, 2, 1, 0, 7]);
        list.reverse();
        assert_eq!(list.nth(0), Some(p(7)));
        assert_eq!(format!("{:?}", SList::<c_void>::new()), "[]");
    }

    #[test] fn borrowed_and_adopted() {
        let mut list = List::new();
        list.append(p(4));
        list.append(p(5));
        let raw = list.into_raw();
        let walked = numbers(unsafe { ListIter::<c_void>::from_raw(raw) });
        assert_eq!(walked, vec![4, 5]);
        let adopted: List<c_void> = unsafe { List::from_raw_full(raw) };
        assert_eq!(adopted.len(), 2);
        assert!(unsafe { SListIter::<c_void>::from_raw(std::ptr::null()) }.next().is_none());
    }

    #[test] fn object_elements() {
        let a = Object::new();
        let b = Object::new();
        let mut list: List<Object> = List::new();
        list.append(&*a as *const Object as *mut Object);
        list.append(&*b as *const Object as *mut Object);
        let borrowed: Vec<&Object> = unsafe { list.iter_ref() }.collect();
        assert!(std::ptr::eq(borrowed[1], &*b));
        let strong = unsafe { list.to_strong() };
        assert_eq!(a.ref_count(), 2);
        drop(list);
        assert_eq!(strong[0].ref_count(), 2);
        drop(strong);
        assert_eq!(a.ref_count(), 1);
        assert_eq!(b.ref_count(), 1);
    }
}
