/// Declares a closed syntax tree: one enum whose variants each wrap a
/// same-named node struct, plus `From` conversions from every node.
///
/// ```text
/// generate_ast!(
///     Expr,
///     [
///         Grouping => { expression: Box<Expr> };
///         Unary    => { op: Token, right: Box<Expr> };
///     ]
/// );
/// ```
macro_rules! generate_ast {
    ($name:ident, [ $($node:ident => { $($field:ident: $ty:ty),+ $(,)? });+ $(;)? ]) => {
        #[derive(Debug, PartialEq, Clone)]
        pub enum $name {
            $($node($node)),+
        }

        $(
            #[derive(Debug, PartialEq, Clone)]
            pub struct $node {
                $(pub $field: $ty),+
            }

            impl From<$node> for $name {
                fn from(node: $node) -> Self {
                    $name::$node(node)
                }
            }
        )+
    };
}

pub(crate) use generate_ast;
