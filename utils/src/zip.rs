/// Zip multiple iterators into a single iterator over flat tuples.
///
/// `zip!(a, b, c)` yields `(a_i, b_i, c_i)` instead of the nested `((a_i, b_i), c_i)`
/// produced by chaining `Iterator::zip`.
#[macro_export]
macro_rules! zip {
    // Implementation calls
    (@flatten |$in:pat_param| $out:expr ) => { // base case for flatten
        |$in| $out
    };
    (@flatten |$in:pat_param| ($($out:tt)*), $_:expr $(,$rest:expr)*) => { // flatten the tuple
        $crate::zip!(@flatten |($in, x)| ( $($out)*, x ) $(,$rest)*)
    };
    // Main entry point
    ($iter:expr $(, $rest:expr)*) => {
        $iter $(.zip($rest))*.map($crate::zip!(@flatten |x| (x) $(,$rest)*))
    }
}
