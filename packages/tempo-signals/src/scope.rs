use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identity key grouping trigger signals that coalesce together.
///
/// Equality and hashing use the address of the shared allocation, never the
/// value inside it: two scopes are equal only if one was cloned from the
/// other. Any `'static` type can serve as a scope. Holding a `Scope` keeps
/// its allocation alive, so an address cannot be reused while the key is
/// in use.
#[derive(Clone)]
pub struct Scope(Rc<dyn Any>);

impl Scope {
    pub fn new<T: Any>(value: T) -> Self {
        Scope(Rc::new(value))
    }

    /// A fresh scope equal to nothing but its own clones.
    pub fn anonymous() -> Self {
        Scope::new(())
    }

    /// Uses an existing shared object as the key.
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Scope(value)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({:#x})", self.addr())
    }
}
