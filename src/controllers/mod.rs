pub mod booking_controller;
