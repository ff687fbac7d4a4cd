mod test_atmosphere;
mod test_gpu;
