pub mod webhook_routes;
