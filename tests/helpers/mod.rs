pub mod mock_h2_server;
