pub mod expression;
pub mod generator;
pub mod lifecycle;
pub mod solver;
pub mod validator;
