mod nested;
mod schema;
mod select;
mod write;
