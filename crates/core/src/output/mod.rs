pub mod annotated_image_writer;
