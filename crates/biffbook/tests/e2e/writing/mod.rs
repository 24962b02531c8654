mod files;
mod globals;
mod strings;
