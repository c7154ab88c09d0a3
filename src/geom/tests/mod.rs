mod fixtures;
mod test_surface;
