pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_artists.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_artists.sql")),
				"tables/002_artworks.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_artworks.sql")),
				"tables/003_models.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_models.sql")),
				"tables/004_artwork_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_artwork_embeddings.sql")),
				"tables/005_concept_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_concept_embeddings.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
