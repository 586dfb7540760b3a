/// Build a [`crate::pure::stack::Stack`] containing the arguments. The only
/// required element is the focus; it is not possible to build an empty
/// stack.
/// ```
/// # use pekwm_core::stack;
/// let s = stack!([1, 2], 3, [4, 5]);
/// let s = stack!([1, 2], 3);
/// let s = stack!(1, [2, 3]);
/// let s = stack!(1, 2, 3);
/// let s = stack!(1);
/// ```
#[macro_export]
macro_rules! stack {
    ([$($up:expr),*], $focus:expr, [$($down:expr),*]) => {
        $crate::pure::stack::Stack::new([$($up),*], $focus, [$($down),*])
    };
    ([$($up:expr),*], $focus:expr) => {
        $crate::pure::stack::Stack::new([$($up),*], $focus, [])
    };
    ($focus:expr, [$($down:expr),*]) => {
        $crate::pure::stack::Stack::new([], $focus, [$($down),*])
    };
    ($focus:expr, $($down:expr),+) => {
        $crate::pure::stack::Stack::new([], $focus, [$($down),*])
    };
    ($focus:expr) => {
        $crate::pure::stack::Stack::new([], $focus, [])
    };
}

/// Remove and return the first element of `$self.$lst` matching `$pred`,
/// leaving the remaining elements in their original relative order.
macro_rules! pop_where {
    ($self:ident, $lst:ident, $($pred:tt)+) => {{
        let placeholder = ::std::mem::take(&mut $self.$lst);
        let pred = $($pred)+;

        let mut remaining = Vec::with_capacity(placeholder.len());
        let mut popped = None;

        for item in placeholder.into_iter() {
            if popped.is_none() && pred(&item) {
                popped = Some(item);
            } else {
                remaining.push(item);
            }
        }

        $self.$lst = remaining;

        popped
    }};
}
