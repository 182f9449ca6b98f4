use crate::block::Block;
use crate::instructions::Stmt;

/// Read-only traversal over a statement tree.
///
/// `visit_stmt` fires in pre-order: a statement is visited before any
/// statement inside its nested blocks. Passes that rebuild blocks do their
/// own iteration; this trait covers the pure scans.
pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt);

    fn enter_block(&mut self, _block: &Block) {}

    fn exit_block(&mut self, _block: &Block) {}
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    visitor.enter_block(block);
    for stmt in block.iter() {
        walk_stmt(visitor, stmt);
    }
    visitor.exit_block(block);
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    visitor.visit_stmt(stmt);
    for block in stmt.blocks() {
        walk_block(visitor, block);
    }
}

/// Run `f` on every statement of `block`, depth first.
pub fn for_each_stmt<F: FnMut(&Stmt)>(block: &Block, f: F) {
    struct Fn<F>(F);
    impl<F: FnMut(&Stmt)> Visitor for Fn<F> {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            (self.0)(stmt);
        }
    }
    walk_block(&mut Fn(f), block);
}
