pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let Some(path) = line.trim().strip_prefix("\\ir ") else {
			out.push_str(line);
			out.push('\n');

			continue;
		};

		match path.trim() {
			"tables/001_catalog_items.sql" =>
				out.push_str(include_str!("../../../sql/tables/001_catalog_items.sql")),
			"tables/002_master_items.sql" =>
				out.push_str(include_str!("../../../sql/tables/002_master_items.sql")),
			"tables/003_client_item_stats.sql" =>
				out.push_str(include_str!("../../../sql/tables/003_client_item_stats.sql")),
			"tables/004_item_aliases.sql" =>
				out.push_str(include_str!("../../../sql/tables/004_item_aliases.sql")),
			"tables/005_producers.sql" =>
				out.push_str(include_str!("../../../sql/tables/005_producers.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}
