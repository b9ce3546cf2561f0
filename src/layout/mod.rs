pub mod tree_layout;
